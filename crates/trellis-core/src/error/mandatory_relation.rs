use super::Error;

/// Error when a relation declared as mandatory holds no value at insert or
/// update time.
#[derive(Debug)]
pub(super) struct MandatoryRelation {
    relation: Box<str>,
    entity: Box<str>,
}

impl std::error::Error for MandatoryRelation {}

impl core::fmt::Display for MandatoryRelation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "non-null value expected for relation {} on object {}",
            self.relation, self.entity
        )
    }
}

impl Error {
    /// Creates a mandatory relation error.
    ///
    /// `relation` names the owner type and accessor (`Country::president`),
    /// `entity` describes the offending instance.
    pub fn mandatory_relation(relation: impl Into<String>, entity: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MandatoryRelation(MandatoryRelation {
            relation: relation.into().into(),
            entity: entity.into().into(),
        }))
    }

    /// Returns `true` if this error is a mandatory relation error.
    pub fn is_mandatory_relation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::MandatoryRelation(_))
    }
}
