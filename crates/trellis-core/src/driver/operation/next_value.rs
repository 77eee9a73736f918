use super::Operation;

#[derive(Debug, Clone)]
pub struct NextValue {
    /// Name of the database sequence
    pub sequence: String,
}

impl From<NextValue> for Operation {
    fn from(value: NextValue) -> Self {
        Self::NextValue(value)
    }
}
