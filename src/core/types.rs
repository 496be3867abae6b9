use serde::{Deserialize, Serialize};

/// A coordinate on the shared reference genome
pub type Locus = u64;

/// A single nucleotide as it may appear in the reference or SNP tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Base {
    A,
    C,
    G,
    T,
    N,
}

impl Base {
    /// Parse a base from its (uppercase) character
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::A),
            'C' => Some(Self::C),
            'G' => Some(Self::G),
            'T' => Some(Self::T),
            'N' => Some(Self::N),
            _ => None,
        }
    }

    /// Parse a field that must hold exactly one base
    #[must_use]
    pub fn from_field(field: &str) -> Option<Self> {
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::C => 'C',
            Self::G => 'G',
            Self::T => 'T',
            Self::N => 'N',
        }
    }
}

impl std::fmt::Display for Base {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The three upstream variant report grammars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// VAAL `k28.out` report
    Vaal,
    /// NUCMER `show-snps` report
    Nucmer,
    /// Variant Call Format
    Vcf,
}

impl FileFormat {
    /// Short tag written to the indel file
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Vaal => "k28",
            Self::Nucmer => "nuc",
            Self::Vcf => "vcf",
        }
    }

    /// Get the display name for this format
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Vaal => "VAAL k28",
            Self::Nucmer => "NUCMER",
            Self::Vcf => "VCF",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Whether an indel adds or removes bases relative to the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndelKind {
    Insertion,
    Deletion,
}

impl IndelKind {
    /// Column value written with `--indel-type`
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Insertion => "INS",
            Self::Deletion => "DEL",
        }
    }
}

/// How a sample/reference field pair whose lengths are not both one is labeled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndelRule {
    /// An empty field means the base is absent on that side. When both
    /// fields carry bases, the longer side determines the kind.
    Standard,
    /// Labeling observed in VAAL k28 handling: an empty sample field is a
    /// deletion and everything else is an insertion, whatever the reference
    /// field holds. Probably a latent bug in the k28 tooling; used for k28
    /// input only.
    VaalLegacy,
}

impl IndelRule {
    /// Classify a record whose fields are not both a single base.
    ///
    /// Returns `None` when both fields hold exactly one base (a SNP).
    #[must_use]
    pub fn classify(self, sample: &str, reference: &str) -> Option<IndelKind> {
        let (sample_len, ref_len) = (sample.len(), reference.len());
        if sample_len == 1 && ref_len == 1 {
            return None;
        }

        let kind = match self {
            _ if sample_len == 0 => IndelKind::Deletion,
            Self::VaalLegacy => IndelKind::Insertion,
            Self::Standard if ref_len == 0 || sample_len > ref_len => IndelKind::Insertion,
            Self::Standard => IndelKind::Deletion,
        };
        Some(kind)
    }
}
