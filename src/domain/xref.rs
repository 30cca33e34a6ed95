//! Cross-reference listings (`cflow -x`).
//!
//! Each line is `name marker file:line [signature...]`; the marker is `*` for
//! a definition. Reference lines carry no marker and are ignored.

use tracing::warn;

/// A function definition found in a cross-reference listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefDefinition {
    pub name: String,
    pub line: u32,
    pub signature: String,
}

pub fn parse_definitions(listing: &str) -> Vec<XrefDefinition> {
    listing
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_definition(idx + 1, line))
        .collect()
}

fn parse_definition(line_no: usize, line: &str) -> Option<XrefDefinition> {
    let components: Vec<&str> = line.split_whitespace().collect();
    match components.as_slice() {
        [] => None,
        [name, "*", location, signature @ ..] => {
            let Some(line) = location
                .rsplit_once(':')
                .and_then(|(_, number)| number.parse::<u32>().ok())
            else {
                warn!(line_no, location, "definition without a line number");
                return None;
            };
            Some(XrefDefinition {
                name: name.to_string(),
                line,
                signature: signature.join(" "),
            })
        }
        [_, "*"] => {
            warn!(line_no, text = line, "definition without a location");
            None
        }
        _ => None,
    }
}
