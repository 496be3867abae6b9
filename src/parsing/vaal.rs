//! Parser for VAAL `k28.out` reports.
//!
//! Layout:
//!
//! ```text
//! #<strain_id>/<reference_genome_filename>
//! ><genbank_id_from_reference>
//! 0 <locus> left=<seq> sample=<seq> ref=<seq> right=<seq>
//! ```
//!
//! Lines starting with `#` or `>` other than the strain header are ignored.
//! VAAL reports loci offset by one, so the locus stored is the reported value
//! plus one. A `sample=` or `ref=` field that is not exactly one base makes the
//! record an indel, labeled with [`IndelRule::VaalLegacy`].

use crate::core::types::{Base, FileFormat, IndelRule, Locus};
use crate::core::variant::{IndelCall, LineOutcome, SnpCall};
use crate::parsing::{chomp, is_base_run, is_unsigned, ParseError, ParseState, VariantParser};

const SEQUENCE_BASES: &[u8] = b"ACGT";

/// Extract the strain identifier from a `#<strain>/<reference>` header line
#[must_use]
pub fn strain_from_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('#')?;
    let (strain, _) = rest.split_once('/')?;
    if strain.is_empty() || strain.chars().any(char::is_whitespace) {
        return None;
    }
    Some(strain)
}

pub struct VaalParser {
    source: String,
    state: ParseState,
    strain_id: Option<String>,
}

impl VaalParser {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            state: ParseState::AwaitingHeader,
            strain_id: None,
        }
    }

    fn malformed(&self, line: &str, line_number: usize) -> ParseError {
        ParseError::MalformedLine {
            format: FileFormat::Vaal,
            file: self.source.clone(),
            line: line_number,
            text: line.to_string(),
        }
    }

    fn bind_strain(
        &mut self,
        strain: &str,
        line: &str,
        line_number: usize,
    ) -> Result<LineOutcome, ParseError> {
        if let Some(bound) = &self.strain_id {
            return Err(ParseError::DuplicateStrainHeader {
                file: self.source.clone(),
                line: line_number,
                bound: bound.clone(),
                text: line.to_string(),
            });
        }
        self.strain_id = Some(strain.to_string());
        // k28 has no separate data marker: data follows the header directly
        self.state = ParseState::InData;
        Ok(LineOutcome::StrainHeader(strain.to_string()))
    }

    fn parse_data(&self, line: &str, line_number: usize) -> Result<LineOutcome, ParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[index, locus, left, sample, reference, right] = fields.as_slice() else {
            return Err(self.malformed(line, line_number));
        };

        let sequence = |field: &str, key: &str| -> Option<String> {
            field
                .strip_prefix(key)
                .filter(|seq| is_base_run(seq, SEQUENCE_BASES))
                .map(str::to_string)
        };

        let (Some(_), Some(sample), Some(reference), Some(_)) = (
            sequence(left, "left="),
            sequence(sample, "sample="),
            sequence(reference, "ref="),
            sequence(right, "right="),
        ) else {
            return Err(self.malformed(line, line_number));
        };

        if !is_unsigned(index) || !is_unsigned(locus) {
            return Err(self.malformed(line, line_number));
        }
        let locus: Locus = locus
            .parse::<Locus>()
            .ok()
            .and_then(|l| l.checked_add(1))
            .ok_or_else(|| self.malformed(line, line_number))?;

        if let Some(kind) = IndelRule::VaalLegacy.classify(&sample, &reference) {
            return Ok(LineOutcome::Indel(IndelCall { locus, kind }));
        }

        match (Base::from_field(&sample), Base::from_field(&reference)) {
            (Some(sample_base), Some(reference_base)) => Ok(LineOutcome::Snp(SnpCall {
                locus,
                sample_base,
                reference_base,
            })),
            _ => Err(self.malformed(line, line_number)),
        }
    }
}

impl VariantParser for VaalParser {
    fn format(&self) -> FileFormat {
        FileFormat::Vaal
    }

    fn strain_id(&self) -> Option<&str> {
        self.strain_id.as_deref()
    }

    fn classify(&mut self, line: &str, line_number: usize) -> Result<LineOutcome, ParseError> {
        let line = chomp(line);
        if line.trim().is_empty() {
            return Ok(LineOutcome::Ignore);
        }

        if line.starts_with('#') {
            return match strain_from_header(line) {
                Some(strain) => self.bind_strain(strain, line, line_number),
                None => Ok(LineOutcome::Ignore),
            };
        }
        if line.starts_with('>') {
            return Ok(LineOutcome::Ignore);
        }

        if self.state != ParseState::InData {
            return Err(ParseError::MissingStrainHeader {
                file: self.source.clone(),
                line: line_number,
            });
        }

        self.parse_data(line, line_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IndelKind;

    fn parser_with_header() -> VaalParser {
        let mut parser = VaalParser::new("s1.k28.out");
        let outcome = parser.classify("#S1/ref.fa\n", 1).unwrap();
        assert_eq!(outcome, LineOutcome::StrainHeader("S1".to_string()));
        parser
    }

    #[test]
    fn test_strain_from_header() {
        assert_eq!(strain_from_header("#S1/ref.fa"), Some("S1"));
        assert_eq!(strain_from_header("#S1/data/ref.fa"), Some("S1"));
        assert_eq!(strain_from_header("#/ref.fa"), None);
        assert_eq!(strain_from_header("# a comment/with slash"), None);
        assert_eq!(strain_from_header("S1/ref.fa"), None);
    }

    #[test]
    fn test_snp_locus_offset() {
        let mut parser = parser_with_header();
        let outcome = parser
            .classify("0 100 left=AC sample=G ref=T right=GG", 3)
            .unwrap();
        assert_eq!(
            outcome,
            LineOutcome::Snp(SnpCall {
                locus: 101,
                sample_base: Base::G,
                reference_base: Base::T,
            })
        );
    }

    #[test]
    fn test_comment_and_genbank_lines_ignored() {
        let mut parser = parser_with_header();
        assert_eq!(parser.classify(">gi|12345", 2).unwrap(), LineOutcome::Ignore);
        assert_eq!(parser.classify("# note", 3).unwrap(), LineOutcome::Ignore);
        assert_eq!(parser.classify("", 4).unwrap(), LineOutcome::Ignore);
    }

    #[test]
    fn test_indels() {
        let mut parser = parser_with_header();
        let deletion = parser
            .classify("0 10 left=AC sample= ref=T right=GG", 2)
            .unwrap();
        assert_eq!(
            deletion,
            LineOutcome::Indel(IndelCall {
                locus: 11,
                kind: IndelKind::Deletion
            })
        );

        let insertion = parser
            .classify("0 20 left=AC sample=GAT ref=T right=GG", 3)
            .unwrap();
        assert!(matches!(
            insertion,
            LineOutcome::Indel(IndelCall {
                kind: IndelKind::Insertion,
                ..
            })
        ));

        // Legacy labeling: any non-empty sample counts as an insertion
        for (line_number, line) in [
            (4, "0 30 left=AC sample=G ref=TTA right=GG"),
            (5, "0 40 left=AC sample=GA ref=TTAC right=GG"),
        ] {
            let legacy = parser.classify(line, line_number).unwrap();
            assert!(matches!(
                legacy,
                LineOutcome::Indel(IndelCall {
                    kind: IndelKind::Insertion,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_data_before_header() {
        let mut parser = VaalParser::new("s1.k28.out");
        let err = parser
            .classify("0 100 left=AC sample=G ref=T right=GG", 1)
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingStrainHeader { line: 1, .. }));
    }

    #[test]
    fn test_second_header_is_fatal() {
        let mut parser = parser_with_header();
        let err = parser.classify("#S2/ref.fa", 5).unwrap_err();
        match err {
            ParseError::DuplicateStrainHeader { bound, line, .. } => {
                assert_eq!(bound, "S1");
                assert_eq!(line, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lines() {
        let mut parser = parser_with_header();
        for line in [
            "0 100 left=AC sample=G ref=T",
            "0 abc left=AC sample=G ref=T right=GG",
            "0 100 left=AC sample=X ref=T right=GG",
            "0 100 left=AC smp=G ref=T right=GG",
            "x 100 left=AC sample=G ref=T right=GG",
        ] {
            assert!(
                matches!(
                    parser.classify(line, 2),
                    Err(ParseError::MalformedLine { .. })
                ),
                "expected malformed: {line}"
            );
        }
    }
}
