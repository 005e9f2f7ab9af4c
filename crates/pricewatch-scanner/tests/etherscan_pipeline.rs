use pricewatch_core::{ClassificationResult, InterfaceDescription, Result};
use pricewatch_etherscan::EtherscanClient;
use pricewatch_scanner::{ResultSink, ScanLoop, ScannerConfig};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const A: &str = "0x00000000000000000000000000000000000000aa";
const B: &str = "0x00000000000000000000000000000000000000bb";

#[derive(Default)]
struct CollectingSink {
    results: Mutex<Vec<ClassificationResult>>,
}

impl ResultSink for CollectingSink {
    fn emit(&self, result: &ClassificationResult, _description: &InterfaceDescription) -> Result<()> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

#[tokio::test]
async fn pending_block_to_price_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "eth_getBlockByNumber"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "transactions": [
                    { "hash": "0x01", "to": A },
                    { "hash": "0x02", "to": B },
                    { "hash": "0x03", "to": null },
                    { "hash": "0x04", "to": A }
                ]
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("action", "getabi"))
        .and(query_param("address", A))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "message": "OK",
            "result": "[{\"type\":\"function\",\"name\":\"getPrice\"}]"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("action", "getabi"))
        .and(query_param("address", B))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Contract source code not verified"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ScannerConfig {
        api_url: server.uri(),
        api_key: "test-key".into(),
        request_interval: Duration::from_millis(10),
        ..Default::default()
    };
    let client = EtherscanClient::new(config.etherscan()).unwrap();
    let sink = Arc::new(CollectingSink::default());
    let mut scan = ScanLoop::new(client, Arc::clone(&sink), &config);

    let first = scan.run_cycle().await.unwrap();
    let second = scan.run_cycle().await.unwrap();

    assert_eq!(first.pending_targets, 2);
    assert_eq!(first.emitted, 1);
    assert_eq!(second.cache_hits, 2);

    let results = sink.results.lock().unwrap().clone();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.address.as_str() == A && r.is_price_related));
    assert_eq!(results[0].transaction_hash, "0x01");
}
