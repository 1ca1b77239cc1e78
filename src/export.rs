//! Output records for accepted rules.
//!
//! One [`RuleRecord`] per accepted rule, with atoms rendered as
//! `predicate(?Vs,?Vo)`. Records serialize to JSON as-is or to TSV rows of
//! head, body and connections.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::rule::{Rule, Var};

/// Prefix marking the head predicate of a rule that predicts violations.
pub const NEGATION_MARKER: &str = "!";

/// A mined rule, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Original target predicate the rule was mined for.
    pub target: String,
    /// Whether the rule predicts constraint violations.
    pub negative: bool,
    pub head: String,
    pub body: Vec<String>,
    /// Entity knots, each a list of variable names.
    pub connections: Vec<Vec<String>>,
}

impl RuleRecord {
    pub fn from_rule(rule: &Rule, target: &str, negative: bool) -> Self {
        let head = rule.head();
        let marker = if negative { NEGATION_MARKER } else { "" };
        Self {
            target: target.to_string(),
            negative,
            head: format!("{marker}{}({},{})", head.predicate, head.subject, head.object),
            body: rule.body().iter().map(ToString::to_string).collect(),
            connections: rule
                .connections()
                .iter()
                .map(|knot| knot.iter().map(Var::to_string).collect())
                .collect(),
        }
    }

    /// `head \t body atoms joined by ';' \t knots joined by ';'`, each knot
    /// written as comma-separated variables.
    pub fn to_tsv_row(&self) -> String {
        let knots: Vec<String> = self.connections.iter().map(|k| k.join(",")).collect();
        format!("{}\t{}\t{}", self.head, self.body.join(";"), knots.join(";"))
    }
}

/// Write all records as a pretty-printed JSON array.
pub fn write_json<W: Write>(records: &[RuleRecord], mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)
}

/// Write a header line and one TSV row per record.
pub fn write_tsv<W: Write>(records: &[RuleRecord], mut out: W) -> io::Result<()> {
    writeln!(out, "head\tbody\tconnections")?;
    for record in records {
        writeln!(out, "{}", record.to_tsv_row())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Atom;

    fn rule() -> Rule {
        Rule::new(
            Atom::new(Var::new(1), "isGenre", Var::new(2)),
            vec![
                Atom::new(Var::new(3), "hasAlbum_1", Var::new(4)),
                Atom::new(Var::new(5), "isGenre_1", Var::new(6)),
            ],
            vec![
                vec![Var::new(1), Var::new(4)],
                vec![Var::new(3), Var::new(5)],
                vec![Var::new(2), Var::new(6)],
            ],
        )
    }

    #[test]
    fn record_renders_atoms() {
        let r = RuleRecord::from_rule(&rule(), "isGenre", false);
        assert_eq!(r.head, "isGenre(?V1,?V2)");
        assert_eq!(r.body, vec!["hasAlbum_1(?V3,?V4)", "isGenre_1(?V5,?V6)"]);
        assert_eq!(r.connections[0], vec!["?V1", "?V4"]);
    }

    #[test]
    fn negative_head_is_marked() {
        let r = RuleRecord::from_rule(&rule(), "isGenre", true);
        assert!(r.negative);
        assert_eq!(r.head, "!isGenre(?V1,?V2)");
    }

    #[test]
    fn tsv_output() {
        let records = vec![RuleRecord::from_rule(&rule(), "isGenre", false)];
        let mut buf = Vec::new();
        write_tsv(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "head\tbody\tconnections");
        assert_eq!(
            lines[1],
            "isGenre(?V1,?V2)\thasAlbum_1(?V3,?V4);isGenre_1(?V5,?V6)\t?V1,?V4;?V2,?V6;?V3,?V5"
        );
    }

    #[test]
    fn json_output_parses_back() {
        let records = vec![RuleRecord::from_rule(&rule(), "isGenre", true)];
        let mut buf = Vec::new();
        write_json(&records, &mut buf).unwrap();
        let parsed: Vec<RuleRecord> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, records);
    }
}
