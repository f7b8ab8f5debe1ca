// file: src/exporter/rules.rs
// description: firewall rule rendering for ufw deny lists and pf tables
// reference: ufw(8), pf.conf(5)

pub const PF_TABLE: &str = "<blocked_ips>";

/// One `deny from` line per indicator. No indicators, no lines.
///
/// Values are written verbatim; they must already be addresses or
/// pseudonyms.
pub fn render_deny_list<S: AsRef<str>>(indicators: &[S]) -> String {
    indicators
        .iter()
        .map(|indicator| format!("deny from {}\n", indicator.as_ref()))
        .collect()
}

/// A persistent pf table plus the rule that blocks it. Both lines are always
/// present; an empty list renders an empty table body.
pub fn render_packet_filter_table<S: AsRef<str>>(indicators: &[S]) -> String {
    let body = indicators
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "table {table} persist {{ {body} }}\nblock in quick from {table} to any\n",
        table = PF_TABLE,
        body = body
    )
}
