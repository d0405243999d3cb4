//! Checks that the batch parsers and the streaming path reduce a
//! response to the same logical grouping.

use futures::stream;

use influxdb_client::csv::{parse_annotated_csv, CsvRowDecoder};
use influxdb_client::json::parse_results_json;
use influxdb_client::stream::collect_tables;

const CSV_BODY: &str = "\
,result,statement,table,_time,_value
,_result,0,0,2026-01-15T00:00:00Z,1
,_result,0,0,2026-01-15T00:00:10Z,2

,result,statement,table,_time,_value
,_result,0,1,2026-01-15T00:00:00Z,3
";

#[tokio::test]
async fn batch_and_streaming_agree_on_grouping() {
    let batch = parse_annotated_csv(CSV_BODY).unwrap();

    let mut decoder = CsvRowDecoder::new();
    let mut rows = decoder.decode(CSV_BODY.as_bytes()).unwrap();
    rows.extend(decoder.finish().unwrap());
    let streamed = collect_tables(stream::iter(rows.into_iter().map(Ok)))
        .await
        .unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(streamed.len(), 2);
    for (batched, streamed) in batch.iter().zip(&streamed) {
        assert_eq!(batched.num_rows(), streamed.num_rows());
    }
}

#[test]
fn every_row_matches_its_header_width_in_both_formats() {
    let json_body = r#"{
        "results": [{
            "series": [{
                "columns": ["time", "usage"],
                "values": [["t0", 1.5], ["t1", 2.5]]
            }]
        }]
    }"#;

    for table in parse_annotated_csv(CSV_BODY)
        .unwrap()
        .iter()
        .chain(parse_results_json(json_body).unwrap().iter())
    {
        for row in table.rows() {
            assert_eq!(row.len(), table.header().len());
        }
    }
}
