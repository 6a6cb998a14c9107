//! Batched transaction reader for the async pipeline
//!
//! `AsyncReader` deserializes transaction rows with csv-async over any
//! `futures::io::AsyncRead`, handing them out in fixed-size batches. Rows that
//! fail to parse or convert are logged and dropped.

use crate::io::csv_format::{convert_csv_transaction, CsvTransaction};
use crate::types::Transaction;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Reads transaction rows in batches without loading the whole file
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Wrap a CSV byte stream, trimming fields and tolerating a missing
    /// category column
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Collect up to `batch_size` valid transactions
    ///
    /// Invalid rows do not count toward the batch. An empty batch means the
    /// input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Transaction> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvTransaction>();

        while batch.len() < batch_size {
            match rows.next().await {
                Some(Ok(csv_row)) => match convert_csv_transaction(csv_row) {
                    Ok(tx) => batch.push(tx),
                    Err(e) => tracing::warn!(error = %e, "Skipping invalid transaction row"),
                },
                Some(Err(e)) => tracing::warn!(error = %e, "CSV parse error"),
                None => break,
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str = "tx,company,type,amount,description,category\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{HEADER}{rows}").into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_multiple_batches() {
        let mut async_reader = reader(
            "1,1,DEBIT,-10,a,\n\
             2,1,CREDIT,20,b,\n\
             3,2,DEBIT,-30,c,\n",
        );

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, 1);
        assert_eq!(batch[1].tx_type, TransactionType::Credit);

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].company, 2);
        assert_eq!(batch[0].amount, Decimal::new(-30, 0));

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");
        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let mut async_reader = reader(
            "1,1,REFUND,10,a,\n\
             2,1,DEBIT,ten,b,\n\
             3,1,DEBIT,-5,c,7\n",
        );

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, 3);
        assert_eq!(batch[0].category, Some(7));
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let mut async_reader = reader("  1  ,  1  , credit ,  100.0  ,  Salário  ,\n");

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].description, "Salário");
        assert_eq!(batch[0].amount, Decimal::new(1000, 1));
    }
}
