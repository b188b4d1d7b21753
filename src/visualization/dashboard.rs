use crate::benchmark::analysis::generate_latency_chart;
use crate::benchmark::metrics::MetricsReport;

pub fn render_report_charts(report: &MetricsReport) {
    let _ = generate_latency_chart(report, "latency.png");
}
