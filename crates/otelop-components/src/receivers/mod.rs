//! Built-in receiver parsers

pub mod k8scluster;
pub mod k8sobjects;
pub mod kubeletstats;
pub mod prometheus;

use std::sync::Arc;

use serde_json::Value;

use crate::builder::Builder;
use crate::component::{DEFAULT_REC_ADDRESS, GRPC, HTTP, TCP, UDP, UNSET_PORT};
use crate::multi_endpoint::{protocol, MultiPortReceiver};
use crate::parser::Parser;
use crate::single_endpoint::{new_single_endpoint_parser, SingleEndpointConfig};

/// Receivers that scrape or read data and expose no ports
const SCRAPERS: &[&str] = &[
    "hostmetrics",
    "sshcheck",
    "cloudfoundry",
    "vcenter",
    "oracledb",
    "snmp",
    "googlecloudpubsub",
    "chrony",
    "jmx",
    "podman_stats",
    "pulsar",
    "docker_stats",
    "aerospike",
    "zookeeper",
    "prometheus_simple",
    "saphana",
    "riak",
    "redis",
    "rabbitmq",
    "purefb",
    "postgresql",
    "nsxt",
    "nginx",
    "mysql",
    "memcached",
    "httpcheck",
    "haproxy",
    "flinkmetrics",
    "couchdb",
    "filelog",
];

fn mapping(name: &str, port: i32) -> Builder<SingleEndpointConfig> {
    protocol(name, port)
        .with_target_port(port)
        .with_default_rec_address(DEFAULT_REC_ADDRESS)
}

fn single(name: &str, port: i32) -> Builder<SingleEndpointConfig> {
    let builder = new_single_endpoint_parser(name, port).with_default_rec_address(DEFAULT_REC_ADDRESS);
    if port == UNSET_PORT {
        builder
    } else {
        builder.with_target_port(port)
    }
}

fn scraper(name: &str) -> Arc<dyn Parser> {
    Arc::new(Builder::<Value>::new().with_name(name).must_build())
}

/// Every built-in receiver parser
pub fn parsers() -> Vec<Arc<dyn Parser>> {
    let mut parsers: Vec<Arc<dyn Parser>> = vec![
        Arc::new(
            MultiPortReceiver::builder("otlp")
                .add_port_mapping(mapping(GRPC, 4317).with_app_protocol(GRPC))
                .add_port_mapping(mapping(HTTP, 4318).with_app_protocol(HTTP))
                .must_build(),
        ),
        Arc::new(
            MultiPortReceiver::builder("skywalking")
                .add_port_mapping(mapping(GRPC, 11800).with_app_protocol(GRPC))
                .add_port_mapping(mapping(HTTP, 12800).with_app_protocol(HTTP))
                .must_build(),
        ),
        Arc::new(
            MultiPortReceiver::builder("jaeger")
                .add_port_mapping(mapping(GRPC, 14250).with_protocol(TCP).with_app_protocol(GRPC))
                .add_port_mapping(
                    mapping("thrift_http", 14268)
                        .with_protocol(TCP)
                        .with_app_protocol(HTTP),
                )
                .add_port_mapping(mapping("thrift_compact", 6831).with_protocol(UDP))
                .add_port_mapping(mapping("thrift_binary", 6832).with_protocol(UDP))
                .must_build(),
        ),
        Arc::new(
            MultiPortReceiver::builder("loki")
                .add_port_mapping(mapping(GRPC, 9095).with_app_protocol(GRPC))
                .add_port_mapping(mapping(HTTP, 3100).with_app_protocol(HTTP))
                .must_build(),
        ),
        Arc::new(single("awsxray", 2000).with_protocol(UDP).must_build()),
        Arc::new(single("carbon", 2003).must_build()),
        Arc::new(single("collectd", 8081).must_build()),
        Arc::new(single("fluentforward", 8006).must_build()),
        Arc::new(single("influxdb", 8086).must_build()),
        Arc::new(single("opencensus", 55678).must_build()),
        Arc::new(single("sapm", 7276).must_build()),
        Arc::new(single("signalfx", 9943).must_build()),
        Arc::new(single("splunk_hec", 8088).must_build()),
        Arc::new(single("statsd", 8125).with_protocol(UDP).must_build()),
        Arc::new(single("tcplog", UNSET_PORT).with_protocol(TCP).must_build()),
        Arc::new(single("udplog", UNSET_PORT).with_protocol(UDP).must_build()),
        Arc::new(single("wavefront", 2003).must_build()),
        Arc::new(
            single("zipkin", 9411)
                .with_protocol(TCP)
                .with_app_protocol(HTTP)
                .must_build(),
        ),
        Arc::new(k8scluster::parser()),
        Arc::new(k8scluster::events_parser()),
        Arc::new(k8sobjects::parser()),
        Arc::new(kubeletstats::parser()),
        Arc::new(prometheus::parser()),
    ];
    parsers.extend(SCRAPERS.iter().map(|name| scraper(name)));
    parsers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ComponentKind, Registry};
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
    use rstest::rstest;
    use serde_json::json;

    fn registry() -> Registry {
        let mut registry = Registry::new(ComponentKind::Receiver);
        for parser in parsers() {
            registry.register(parser);
        }
        registry
    }

    #[rstest]
    #[case::awsxray("awsxray", 2000, Some(UDP), None)]
    #[case::carbon("carbon", 2003, None, None)]
    #[case::collectd("collectd", 8081, None, None)]
    #[case::fluentforward("fluentforward", 8006, None, None)]
    #[case::influxdb("influxdb", 8086, None, None)]
    #[case::opencensus("opencensus", 55678, None, None)]
    #[case::sapm("sapm", 7276, None, None)]
    #[case::signalfx("signalfx", 9943, None, None)]
    #[case::splunk_hec("splunk_hec", 8088, None, None)]
    #[case::statsd("statsd", 8125, Some(UDP), None)]
    #[case::wavefront("wavefront", 2003, None, None)]
    #[case::zipkin("zipkin", 9411, Some(TCP), Some(HTTP))]
    fn single_endpoint_defaults(
        #[case] name: &str,
        #[case] port: i32,
        #[case] transport: Option<&str>,
        #[case] app: Option<&str>,
    ) {
        let ports = registry().parser_for(name).ports(name, &Value::Null).unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, port);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(port)));
        assert_eq!(ports[0].protocol.as_deref(), transport);
        assert_eq!(ports[0].app_protocol.as_deref(), app);
        assert_eq!(ports[0].name.as_deref(), Some(name.replace('_', "-").as_str()));
    }

    #[rstest]
    #[case::tcplog("tcplog", TCP)]
    #[case::udplog("udplog", UDP)]
    fn log_receivers_need_an_explicit_port(#[case] name: &str, #[case] transport: &str) {
        let parser = registry().parser_for(name);
        assert!(parser.ports(name, &json!({})).is_err());
        let ports = parser
            .ports(name, &json!({"listen_address": "0.0.0.0:54525"}))
            .unwrap();
        assert_eq!(ports[0].port, 54525);
        assert_eq!(ports[0].protocol.as_deref(), Some(transport));
        assert_eq!(parser.get_default_config(&json!({})).unwrap(), json!({}));
    }

    #[rstest]
    #[case::otlp("otlp", &[("grpc", 4317), ("http", 4318)])]
    #[case::skywalking("skywalking", &[("grpc", 11800), ("http", 12800)])]
    #[case::loki("loki", &[("grpc", 9095), ("http", 3100)])]
    #[case::jaeger("jaeger", &[("grpc", 14250), ("thrift_binary", 6832), ("thrift_compact", 6831), ("thrift_http", 14268)])]
    fn multi_protocol_defaults(#[case] name: &str, #[case] expected: &[(&str, i32)]) {
        let mut protocols = serde_json::Map::new();
        for (proto, _) in expected {
            protocols.insert(proto.to_string(), Value::Null);
        }
        let config = json!({"protocols": protocols});
        let ports = registry().parser_for(name).ports(name, &config).unwrap();
        let got: Vec<i32> = ports.iter().map(|p| p.port).collect();
        let want: Vec<i32> = expected.iter().map(|(_, port)| *port).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn jaeger_transport_protocols() {
        let ports = registry()
            .parser_for("jaeger")
            .ports(
                "jaeger",
                &json!({"protocols": {"grpc": {}, "thrift_http": {}, "thrift_compact": {}}}),
            )
            .unwrap();
        assert_eq!(ports[0].protocol.as_deref(), Some(TCP));
        assert_eq!(ports[0].app_protocol.as_deref(), Some(GRPC));
        assert_eq!(ports[1].protocol.as_deref(), Some(UDP));
        assert_eq!(ports[1].app_protocol, None);
        assert_eq!(ports[2].protocol.as_deref(), Some(TCP));
        assert_eq!(ports[2].app_protocol.as_deref(), Some(HTTP));
    }

    #[test]
    fn scrapers_expose_nothing() {
        let registry = registry();
        for name in SCRAPERS {
            let parser = registry.parser_for(name);
            assert!(parser
                .ports(name, &json!({"endpoint": "0.0.0.0:9999"}))
                .unwrap()
                .is_empty());
            assert!(parser.get_rbac_rules(&Value::Null).unwrap().is_empty());
        }
    }

    #[test]
    fn otlp_default_config_fills_listed_protocols() {
        let defaulted = registry()
            .parser_for("otlp")
            .get_default_config(&json!({"protocols": {"grpc": null, "http": {"endpoint": "localhost:4318"}}}))
            .unwrap();
        assert_eq!(
            defaulted,
            json!({"protocols": {
                "grpc": {"endpoint": "0.0.0.0:4317"},
                "http": {"endpoint": "localhost:4318"}
            }})
        );
    }
}
