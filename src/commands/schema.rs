//! Schema browsing commands: buckets, measurements and tag keys

use snafu::{ResultExt, Snafu};

use influxdb_client::Client;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Error listing buckets: {}", source))]
    ListBuckets { source: influxdb_client::Error },

    #[snafu(display("Error listing measurements: {}", source))]
    ListMeasurements { source: influxdb_client::Error },

    #[snafu(display("Error listing tag keys: {}", source))]
    ListTagKeys { source: influxdb_client::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub async fn buckets(client: &Client) -> Result<()> {
    let names = client.list_buckets().await.context(ListBuckets)?;
    print_names(&names, "No buckets found.");
    Ok(())
}

pub async fn measurements(client: &Client, bucket: &str) -> Result<()> {
    let names = client
        .list_measurements(bucket)
        .await
        .context(ListMeasurements)?;
    print_names(&names, "No measurements found.");
    Ok(())
}

pub async fn tag_keys(client: &Client, bucket: &str, measurement: &str) -> Result<()> {
    let names = client
        .list_tag_keys(bucket, measurement)
        .await
        .context(ListTagKeys)?;
    print_names(&names, "No tag keys found.");
    Ok(())
}

fn print_names(names: &[String], empty_message: &str) {
    if names.is_empty() {
        println!("{}", empty_message);
    } else {
        println!("{}", names.join("\n"));
    }
}
