use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{TransferError, TransferResult};

/// Run `fut` unless `cancel` fires first.
///
/// Every blocking backend call (store, ledger, internal HTTP) goes through
/// this so that cancelling a session aborts the command in flight.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> TransferResult<T>
where
    F: Future<Output = TransferResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransferError::Cancelled),
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn passes_through_when_not_cancelled() {
        let token = CancellationToken::new();
        let value = cancellable(&token, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let err = cancellable(&token, std::future::pending::<TransferResult<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Cancelled));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
