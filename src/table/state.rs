use crate::error::ProtocolViolation;

/// Protocol state of the connection of a [`super::Table`].
///
/// A COPY may be opened inside a transaction. While COPY is open only copy
/// data and the end of the copy are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Idle,
    InTransaction,
    InCopy,
    InTransactionAndCopy,
}

/// Operations which change or depend on the connection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Begin,
    Commit,
    IntermediateCommit,
    StartCopy,
    CopyData,
    EndCopy,
    /// Any statement other than COPY data: ad-hoc queries, prepared deletes and reads.
    Query,
}

impl ConnectionState {
    fn from_flags(in_transaction: bool, in_copy: bool) -> Self {
        match (in_transaction, in_copy) {
            (false, false) => Self::Idle,
            (true, false) => Self::InTransaction,
            (false, true) => Self::InCopy,
            (true, true) => Self::InTransactionAndCopy,
        }
    }

    pub fn in_copy(self) -> bool {
        matches!(self, Self::InCopy | Self::InTransactionAndCopy)
    }

    pub fn in_transaction(self) -> bool {
        matches!(self, Self::InTransaction | Self::InTransactionAndCopy)
    }

    /// State after `transition` succeeded, or why it is not allowed now.
    pub(crate) fn after(self, transition: Transition) -> Result<Self, ProtocolViolation> {
        let in_transaction = self.in_transaction();
        let in_copy = self.in_copy();
        match transition {
            Transition::Begin | Transition::Commit | Transition::Query if in_copy => {
                Err(ProtocolViolation::InCopyMode)
            }
            Transition::IntermediateCommit if in_copy => Err(ProtocolViolation::InCopyMode),
            Transition::IntermediateCommit if !in_transaction => {
                Err(ProtocolViolation::NoOpenTransaction)
            }
            Transition::StartCopy if in_copy => Err(ProtocolViolation::InCopyMode),
            Transition::CopyData | Transition::EndCopy if !in_copy => {
                Err(ProtocolViolation::NotInCopyMode)
            }
            Transition::Begin => Ok(Self::from_flags(true, false)),
            Transition::Commit | Transition::IntermediateCommit => {
                Ok(Self::from_flags(false, false))
            }
            Transition::StartCopy => Ok(Self::from_flags(in_transaction, true)),
            Transition::EndCopy => Ok(Self::from_flags(in_transaction, false)),
            Transition::CopyData | Transition::Query => Ok(self),
        }
    }

    /// State once the store has left COPY mode, whether the copy succeeded or not.
    pub(crate) fn without_copy(self) -> Self {
        Self::from_flags(self.in_transaction(), false)
    }

    /// State once the transaction block is over, whether COMMIT succeeded or not.
    pub(crate) fn without_transaction(self) -> Self {
        Self::from_flags(false, self.in_copy())
    }
}
