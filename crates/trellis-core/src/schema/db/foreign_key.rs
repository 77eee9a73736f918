/// A foreign key relating columns of one table to columns of another.
///
/// Source and target column lists are positional: the i-th source column
/// references the i-th target column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name, derived from a
    /// [`ForeignKeyNaming`](crate::schema::naming::ForeignKeyNaming) strategy.
    pub name: String,

    /// Referencing table
    pub table: String,

    /// Referencing columns
    pub columns: Vec<String>,

    /// Referenced table
    pub target_table: String,

    /// Referenced columns
    pub target_columns: Vec<String>,
}

impl ForeignKey {
    /// Returns the `(source, target)` column pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.columns
            .iter()
            .zip(&self.target_columns)
            .map(|(source, target)| (source.as_str(), target.as_str()))
    }
}
