use finport_core::RawRow;

/// Account identity parsed from the statement's free-text header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTitleId {
    pub title: String,
    pub id: String,
}

/// What a tabular row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// A traded position
    Holding,
    /// Uninvested cash, decoded as a synthetic security
    Cash,
    /// The aggregate "Account Total" line
    Footer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub kind: RowKind,
    pub raw: RawRow,
}
