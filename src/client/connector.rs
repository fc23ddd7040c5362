use crate::client::transaction::{parse_transaction_id, TransactionState, TransactionTracker};
use crate::core::{
    errors::EntityError,
    kernel::{rest::HEADER_TRANSACTION_ID, HttpTransport, RequestExecutor, ReqwestTransport},
    types::{with_query, DeleteOptions, Filter, HistoryOptions, ListOptions, QueryOptions},
};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

/// Entity Server client
///
/// Every operation returns the server's JSON response as text. While a
/// transaction is active, `submit` and `delete` are queued on the server and
/// only executed on [`trans_commit`](Self::trans_commit).
///
/// Transaction lifecycle calls take `&mut self`: one client holds one
/// transaction context. Share a client across tasks only behind external
/// synchronization such as `tokio::sync::Mutex`.
pub struct EntityServerClient<T: HttpTransport = ReqwestTransport> {
    executor: RequestExecutor<T>,
    transaction: TransactionTracker,
}

impl<T: HttpTransport> std::fmt::Debug for EntityServerClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityServerClient")
            .field("executor", &self.executor)
            .field("transaction", &self.transaction)
            .finish()
    }
}

impl<T: HttpTransport> EntityServerClient<T> {
    /// Create a client with dependency injection
    pub fn new(executor: RequestExecutor<T>) -> Self {
        Self {
            executor,
            transaction: TransactionTracker::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.executor.base_url()
    }

    pub const fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    pub const fn transaction_state(&self) -> &TransactionState {
        self.transaction.state()
    }

    /// Id of the transaction started with [`trans_start`](Self::trans_start), if any
    pub fn active_transaction(&self) -> Option<&str> {
        self.transaction.active()
    }

    /// Start a transaction and remember its id
    ///
    /// Subsequent `submit` / `delete` calls are queued server-side until
    /// [`trans_commit`](Self::trans_commit).
    #[instrument(skip(self))]
    pub async fn trans_start(&mut self) -> Result<String, EntityError> {
        self.transaction.ensure_idle()?;

        let body = self
            .executor
            .execute(Method::POST, "/v1/transaction/start", None, &[])
            .await?;
        let tx_id = parse_transaction_id(&body)?;

        self.transaction.activate(tx_id.clone())?;
        Ok(tx_id)
    }

    /// Commit all queued operations in one server-side database transaction
    ///
    /// `transaction_id` defaults to the active transaction. The local active
    /// id is forgotten even if the commit fails.
    #[instrument(skip(self))]
    pub async fn trans_commit(&mut self, transaction_id: Option<&str>) -> Result<String, EntityError> {
        let tx_id = self.transaction.finish(transaction_id)?;
        self.executor
            .execute(Method::POST, &format!("/v1/transaction/commit/{}", tx_id), None, &[])
            .await
    }

    /// Roll back a transaction
    ///
    /// `transaction_id` defaults to the active transaction. The local active
    /// id is forgotten even if the rollback fails.
    #[instrument(skip(self))]
    pub async fn trans_rollback(
        &mut self,
        transaction_id: Option<&str>,
    ) -> Result<String, EntityError> {
        let tx_id = self.transaction.finish(transaction_id)?;
        self.executor
            .execute(Method::POST, &format!("/v1/transaction/rollback/{}", tx_id), None, &[])
            .await
    }

    /// Fetch one record
    #[instrument(skip(self))]
    pub async fn get(&self, entity: &str, seq: u64) -> Result<String, EntityError> {
        self.executor
            .execute(Method::GET, &format!("/v1/entity/{}/{}", entity, seq), None, &[])
            .await
    }

    #[instrument(skip(self, options))]
    pub async fn list(&self, entity: &str, options: &ListOptions) -> Result<String, EntityError> {
        let path = with_query(&format!("/v1/entity/{}/list", entity), &options.to_params());
        self.executor.execute(Method::GET, &path, None, &[]).await
    }

    #[instrument(skip(self))]
    pub async fn count(&self, entity: &str) -> Result<String, EntityError> {
        self.executor
            .execute(Method::GET, &format!("/v1/entity/{}/count", entity), None, &[])
            .await
    }

    /// Filtered search, e.g. `[Filter::equals("status", "active")]`
    #[instrument(skip(self, filters, options), fields(filter_count = filters.len()))]
    pub async fn query(
        &self,
        entity: &str,
        filters: &[Filter],
        options: &QueryOptions,
    ) -> Result<String, EntityError> {
        let path = with_query(&format!("/v1/entity/{}/query", entity), &options.to_params());
        let body = serde_json::to_string(filters)?;
        self.executor
            .execute(Method::POST, &path, Some(&body), &[])
            .await
    }

    /// Create or update a record
    ///
    /// A `seq` field in `data` makes this an update. Inside a transaction,
    /// later submits may reference earlier ones with `"$tx.<index>"`
    /// placeholders; they are sent untouched and resolved by the server at
    /// commit time.
    #[instrument(skip(self, data))]
    pub async fn submit<B: Serialize + ?Sized>(
        &self,
        entity: &str,
        data: &B,
        transaction_id: Option<&str>,
    ) -> Result<String, EntityError> {
        let body = serde_json::to_string(data)?;
        let path = format!("/v1/entity/{}/submit", entity);
        let tx_header = self.transaction_header(transaction_id);

        self.executor
            .execute(Method::POST, &path, Some(&body), tx_header.as_slice())
            .await
    }

    #[instrument(skip(self, options), fields(hard = options.hard))]
    pub async fn delete(
        &self,
        entity: &str,
        seq: u64,
        options: &DeleteOptions,
    ) -> Result<String, EntityError> {
        let path = with_query(
            &format!("/v1/entity/{}/delete/{}", entity, seq),
            &options.to_params(),
        );
        let tx_header = self.transaction_header(options.transaction_id.as_deref());

        self.executor
            .execute(Method::DELETE, &path, None, tx_header.as_slice())
            .await
    }

    /// Change history of one record
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        entity: &str,
        seq: u64,
        options: HistoryOptions,
    ) -> Result<String, EntityError> {
        let path = with_query(
            &format!("/v1/entity/{}/history/{}", entity, seq),
            &options.to_params(),
        );
        self.executor.execute(Method::GET, &path, None, &[]).await
    }

    /// Revert a single change identified by its history seq
    #[instrument(skip(self))]
    pub async fn rollback(&self, entity: &str, history_seq: u64) -> Result<String, EntityError> {
        self.executor
            .execute(
                Method::POST,
                &format!("/v1/entity/{}/rollback/{}", entity, history_seq),
                None,
                &[],
            )
            .await
    }

    fn transaction_header<'a>(&'a self, explicit: Option<&'a str>) -> Option<(&'static str, &'a str)> {
        self.transaction
            .resolve(explicit)
            .map(|tx_id| (HEADER_TRANSACTION_ID, tx_id))
    }
}
