use prodsearch_core::SearchRequest;
use prodsearch_qdrant::QdrantProductSearch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let search = QdrantProductSearch::from_env()?;
    if !search.verify_collection().await? {
        return Err(format!("collection '{}' does not exist", search.collection()).into());
    }

    let dimension = search.vector_size().unwrap_or(1536);
    let mut vector = vec![0.0_f32; dimension];
    vector[0] = 1.0;

    let mut request = SearchRequest::new(vector).with_limit(3);
    if let Ok(client_id) = std::env::var("CLIENT_ID") {
        request = request.with_client_id(client_id);
    }

    for product in search.query(&request).await? {
        println!(
            "{:>6.3}  {}  {:.2} {}",
            product.score, product.name, product.price, product.currency
        );
    }

    search.close();
    Ok(())
}
