use entity_server_client::{EntityServerClient, Filter, HistoryOptions, ListOptions, QueryOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Reads ENTITY_SERVER_URL / _API_KEY / _HMAC_SECRET and ENTITY_PACKET_MAGIC_LEN
    #[cfg(feature = "env-file")]
    let mut es = EntityServerClient::from_env_file(".env")?;
    #[cfg(not(feature = "env-file"))]
    let mut es = EntityServerClient::from_env()?;

    let list = es.list("product", &ListOptions::default().limit(5)).await?;
    println!("List: {}", list);

    let count = es.count("product").await?;
    println!("Count: {}", count);

    let results = es
        .query(
            "product",
            &[Filter::equals("category", "electronics")],
            &QueryOptions::default().limit(10),
        )
        .await?;
    println!("Query: {}", results);

    // Staged writes: the order_item refers to the order created in the same
    // transaction through the "$tx.0" placeholder.
    es.trans_start().await?;
    let staged = async {
        es.submit("order", &json!({ "user_seq": 1, "total": 9900 }), None)
            .await?;
        es.submit("order_item", &json!({ "order_seq": "$tx.0", "item_seq": 5 }), None)
            .await
    }
    .await;

    match staged {
        Ok(_) => {
            let committed = es.trans_commit(None).await?;
            println!("Committed: {}", committed);
        }
        Err(e) => {
            println!("Staging failed, rolling back: {}", e);
            es.trans_rollback(None).await?;
        }
    }

    if let Ok(item) = es.get("product", 1).await {
        println!("Get: {}", item);
        let history = es.history("product", 1, HistoryOptions::default()).await?;
        println!("History: {}", history);
    }

    // Example delete (commented out for safety)
    /*
    let deleted = es
        .delete("product", 1, &entity_server_client::DeleteOptions::default().hard(true))
        .await?;
    println!("Deleted: {}", deleted);
    */

    Ok(())
}
