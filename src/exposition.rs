//! Text exposition of metric families.

use prometheus::proto;
use prometheus::{Encoder, TextEncoder};

use crate::error::CheckError;
use crate::metrics::{MetricFamily, MetricPoint};

fn to_proto_metric(point: &MetricPoint) -> proto::Metric {
    // BTreeMap iteration yields label keys in ascending order.
    let labels: Vec<proto::LabelPair> = point
        .labels
        .iter()
        .map(|(name, value)| {
            let mut pair = proto::LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.clone());
            pair
        })
        .collect();

    let mut gauge = proto::Gauge::default();
    gauge.set_value(point.value);

    let mut metric = proto::Metric::default();
    metric.label = labels;
    metric.gauge = Some(gauge).into();
    metric.set_timestamp_ms(point.timestamp_ms);
    metric
}

/// Converts a family into its protobuf form.
pub fn to_proto_family(family: &MetricFamily) -> proto::MetricFamily {
    let mut mf = proto::MetricFamily::default();
    mf.set_name(family.name.clone());
    mf.set_help(family.help.clone());
    mf.set_type(proto::MetricType::GAUGE);
    mf.metric = family.points.iter().map(to_proto_metric).collect();
    mf
}

/// Renders a single family. Empty families render as an empty string.
pub fn render_family(family: &MetricFamily) -> Result<String, CheckError> {
    if family.is_empty() {
        return Ok(String::new());
    }

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&[to_proto_family(family)], &mut buffer)
        .map_err(|e| CheckError::Exposition {
            family: family.name.clone(),
            reason: e.to_string(),
        })?;

    String::from_utf8(buffer).map_err(|e| CheckError::Exposition {
        family: family.name.clone(),
        reason: e.to_string(),
    })
}

/// Renders the families in order, one at a time, skipping empty ones.
/// The first failing family aborts the rest.
pub fn render<'a, I>(families: I) -> Result<String, CheckError>
where
    I: IntoIterator<Item = &'a MetricFamily>,
{
    let mut text = String::new();
    for family in families {
        text.push_str(&render_family(family)?);
    }
    Ok(text)
}
