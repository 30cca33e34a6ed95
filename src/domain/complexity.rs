//! Per-function complexity reports in `lizard --csv` form:
//! `NLOC,CCN,token,PARAM,length,"location","file","function","long_name",start,end`.

use tracing::warn;

use crate::domain::callgraph::Complexity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionComplexity {
    pub name: String,
    pub metrics: Complexity,
}

const NLOC: usize = 0;
const CCN: usize = 1;
const FUNCTION: usize = 7;

pub fn parse_report(report: &str) -> Vec<FunctionComplexity> {
    report
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| parse_row(idx + 1, line))
        .collect()
}

fn parse_row(line_no: usize, line: &str) -> Option<FunctionComplexity> {
    let fields = split_fields(line);
    let nloc = fields.get(NLOC)?.trim();
    // header row
    if nloc.eq_ignore_ascii_case("nloc") {
        return None;
    }

    let parsed = (
        nloc.parse::<u32>(),
        fields.get(CCN).map(|f| f.trim().parse::<u32>()),
        fields.get(FUNCTION),
    );
    match parsed {
        (Ok(statements), Some(Ok(cyclomatic)), Some(name)) if !name.is_empty() => {
            Some(FunctionComplexity {
                name: name.clone(),
                metrics: Complexity {
                    cyclomatic,
                    statements,
                },
            })
        }
        _ => {
            warn!(line_no, row = line, "unreadable complexity row");
            None
        }
    }
}

/// Split one CSV row, honoring double quotes and `""` escapes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
