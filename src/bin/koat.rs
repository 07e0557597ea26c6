#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    traverse::launch("koat").await
}
