//! Port specification parsing tests

use hostsweep::{PortSpec, ScanError};
use proptest::prelude::*;

fn assert_invalid(spec: &str) {
    match PortSpec::parse(spec) {
        Err(ScanError::InvalidPortSpec(_)) => {}
        other => panic!("{:?} should be rejected, got {:?}", spec, other),
    }
}

#[test]
fn test_overlapping_tokens_collapse_sorted() {
    let spec = PortSpec::parse("80,22,20-22").unwrap();
    assert_eq!(spec.to_vec(), vec![20, 21, 22, 80]);
}

#[test]
fn test_single_port_and_full_range() {
    assert_eq!(PortSpec::parse("443").unwrap().to_vec(), vec![443]);

    let all = PortSpec::parse("1-65535").unwrap();
    assert_eq!(all.len(), 65535);
    assert!(all.contains(1));
    assert!(all.contains(65535));
}

#[test]
fn test_whitespace_around_tokens() {
    let spec = PortSpec::parse(" 22 , 80 - 82 ,443").unwrap();
    assert_eq!(spec.to_vec(), vec![22, 80, 81, 82, 443]);
}

#[test]
fn test_degenerate_range() {
    assert_eq!(PortSpec::parse("8080-8080").unwrap().to_vec(), vec![8080]);
}

#[test]
fn test_malformed_specs_are_rejected() {
    for spec in [
        "", "  ", "80-", "-80", "0", "65536", "100-90", "http", "22,,80", "1-2-3", "22;80",
        "-1", "80,", "+80", "22,+443", "80-+90", "0x50", "８０",
    ] {
        assert_invalid(spec);
    }
}

#[test]
fn test_port_spec_error_exit_code() {
    let err = PortSpec::parse("99999").unwrap_err();
    assert!(err.is_input_error());
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("99999"));
}

#[test]
fn test_display_collapses_runs() {
    let spec = PortSpec::parse("443,20-23,80").unwrap();
    assert_eq!(spec.to_string(), "20-23,80,443");

    // the display form parses back to the same set
    assert_eq!(PortSpec::parse(&spec.to_string()).unwrap(), spec);
}

#[test]
fn test_from_ports_rejects_zero() {
    assert!(PortSpec::from_ports([0, 22]).is_err());
    assert_eq!(PortSpec::from_ports([80, 22, 80]).unwrap().to_vec(), vec![22, 80]);
}

#[test]
fn test_serde_uses_string_form() {
    let spec: PortSpec = serde_json::from_str("\"22,80-81\"").unwrap();
    assert_eq!(spec.to_vec(), vec![22, 80, 81]);
    assert_eq!(serde_json::to_string(&spec).unwrap(), "\"22,80-81\"");
    assert!(serde_json::from_str::<PortSpec>("\"0\"").is_err());
}

proptest! {
    #[test]
    fn prop_parse_is_sorted_unique_and_in_bounds(
        tokens in prop::collection::vec((1u16..=65535, 0u16..64), 1..12)
    ) {
        let spec_text = tokens
            .iter()
            .map(|&(start, width)| {
                let end = start.saturating_add(width);
                if width == 0 { start.to_string() } else { format!("{}-{}", start, end) }
            })
            .collect::<Vec<_>>()
            .join(",");

        let ports = PortSpec::parse(&spec_text).unwrap().to_vec();
        prop_assert!(!ports.is_empty());
        prop_assert!(ports.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(ports.iter().all(|&p| p >= 1));

        for &(start, width) in &tokens {
            let end = start.saturating_add(width);
            prop_assert!((start..=end).all(|p| ports.binary_search(&p).is_ok()));
        }
    }

    #[test]
    fn prop_out_of_range_ports_fail(port in 65536u32..1_000_000) {
        prop_assert!(PortSpec::parse(&port.to_string()).is_err());
    }
}
