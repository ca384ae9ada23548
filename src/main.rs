#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    invoice_server::run().await
}
