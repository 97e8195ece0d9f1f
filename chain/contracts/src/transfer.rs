//! Outbound value transfer seam
//!
//! `withdraw` pays out through a `ValueTransfer` supplied by the host. The
//! implementation receives the ledger itself, so recipient code running
//! during the payout can attempt to call back into it. That call-back is the
//! ledger's single suspension point.

use types::ids::AccountId;
use types::numeric::Wei;

use crate::errors::TransferError;
use crate::ledger::BalanceLedger;

/// Moves native value out of the ledger's custody to a recipient.
pub trait ValueTransfer {
    /// Deliver `amount` to `to`.
    ///
    /// Returning an error makes the ledger roll back the withdrawal that
    /// triggered the transfer.
    fn send(
        &mut self,
        ledger: &mut BalanceLedger,
        to: AccountId,
        amount: Wei,
    ) -> Result<(), TransferError>;
}
