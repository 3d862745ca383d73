//! Evidence Builder.

pub mod builder;
pub mod claims;
pub mod fingerprint;
pub mod impact;
pub mod source;

pub use builder::{build_evidence_bundle, EvidenceBuilderInput, EvidenceBundle, TargetEvidence};
pub use claims::{ClaimLocation, ClaimType, DocClaim, DocSurface, ExtractionMethod};
pub use fingerprint::{compute_fingerprints, FingerprintInputs, Fingerprints};
pub use impact::{assess_impact, BlastRadius, ImpactAssessment, ImpactBand, ImpactInputs};
pub use source::{build_source_evidence, SourceArtifacts, SourceEvidence};
