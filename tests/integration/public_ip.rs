//! Integration tests for the public IP lookup against a mock HTTP endpoint

use std::time::Duration;

use syspulse::{
    config::SamplerConfig,
    sampler::{Sampler, SystemSampler, network::PublicIpLookup},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_public_ip_is_fetched_once_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
        .expect(1)
        .mount(&server)
        .await;

    let mut lookup = PublicIpLookup::new(Some(server.uri()), Duration::from_secs(600));

    assert_eq!(lookup.current().await, "203.0.113.7");
    assert_eq!(lookup.current().await, "203.0.113.7");
}

#[tokio::test]
async fn test_public_ip_refreshes_after_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.1"))
        .expect(2)
        .mount(&server)
        .await;

    let mut lookup = PublicIpLookup::new(Some(server.uri()), Duration::ZERO);

    lookup.current().await;
    assert_eq!(lookup.current().await, "198.51.100.1");
}

#[tokio::test]
async fn test_public_ip_failure_yields_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut lookup = PublicIpLookup::new(Some(server.uri()), Duration::from_secs(600));

    assert_eq!(lookup.current().await, "");
}

#[tokio::test]
async fn test_public_ip_empty_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&server)
        .await;

    let mut lookup = PublicIpLookup::new(Some(server.uri()), Duration::from_secs(600));

    assert_eq!(lookup.current().await, "");
}

#[tokio::test]
async fn test_system_sampler_reports_public_ip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("192.0.2.55"))
        .mount(&server)
        .await;

    let mut sampler = SystemSampler::new(SamplerConfig {
        ping_targets: vec![],
        public_ip_url: Some(server.uri()),
        ..SamplerConfig::default()
    });

    let snapshot = sampler.sample().await;

    assert_eq!(snapshot.network_details.public_ip, "192.0.2.55");
}
