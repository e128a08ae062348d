//! Display helpers shared by the service and the CLI.

/// Short notation for large amounts: `1_100_000 => "1.1M"`, `466_800 => "466.8K"`.
pub fn format_short_number(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}

/// Abbreviates an address to `start...end`, keeping `length` characters on each side.
pub fn format_wallet_address(address: Option<&str>, length: usize) -> String {
    let Some(address) = address else {
        return "Anonymous".to_string();
    };
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= length * 2 {
        return address.to_string();
    }
    let start: String = chars[..length].iter().collect();
    let end: String = chars[chars.len() - length..].iter().collect();
    format!("{}...{}", start, end)
}
