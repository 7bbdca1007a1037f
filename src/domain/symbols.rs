//! Built-in NSE symbol catalogue for the symbol picker.

use serde::Serialize;

pub const MAX_RESULTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
}

const fn listing(symbol: &'static str, name: &'static str, sector: &'static str) -> Listing {
    Listing {
        symbol,
        name,
        sector,
    }
}

pub static NSE_LISTINGS: &[Listing] = &[
    listing("RELIANCE", "Reliance Industries Ltd", "Energy"),
    listing("TCS", "Tata Consultancy Services Ltd", "Technology"),
    listing("HDFCBANK", "HDFC Bank Ltd", "Finance"),
    listing("INFY", "Infosys Ltd", "Technology"),
    listing("ICICIBANK", "ICICI Bank Ltd", "Finance"),
    listing("HINDUNILVR", "Hindustan Unilever Ltd", "FMCG"),
    listing("ITC", "ITC Ltd", "FMCG"),
    listing("SBIN", "State Bank of India", "Finance"),
    listing("BHARTIARTL", "Bharti Airtel Ltd", "Technology"),
    listing("KOTAKBANK", "Kotak Mahindra Bank Ltd", "Finance"),
    listing("LT", "Larsen & Toubro Ltd", "Other"),
    listing("AXISBANK", "Axis Bank Ltd", "Finance"),
    listing("BAJFINANCE", "Bajaj Finance Ltd", "Finance"),
    listing("MARUTI", "Maruti Suzuki India Ltd", "Auto"),
    listing("SUNPHARMA", "Sun Pharmaceutical Industries Ltd", "Pharma"),
    listing("WIPRO", "Wipro Ltd", "Technology"),
    listing("TITAN", "Titan Company Ltd", "Other"),
    listing("ZOMATO", "Zomato Ltd", "Technology"),
    listing("PAYTM", "One97 Communications Ltd", "Technology"),
    listing("NYKAA", "FSN E-Commerce Ventures Ltd", "Technology"),
    listing("IRCTC", "Indian Railway Catering & Tourism Ltd", "Other"),
    listing("HAL", "Hindustan Aeronautics Ltd", "Other"),
    listing("TATAMOTORS", "Tata Motors Ltd", "Auto"),
    listing("TATASTEEL", "Tata Steel Ltd", "Metal"),
    listing("ADANIENT", "Adani Enterprises Ltd", "Other"),
    listing("ZYDUSLIFE", "Zydus Lifesciences Ltd", "Pharma"),
    listing("DRREDDY", "Dr Reddy's Laboratories Ltd", "Pharma"),
    listing("CIPLA", "Cipla Ltd", "Pharma"),
    listing("HCLTECH", "HCL Technologies Ltd", "Technology"),
    listing("DLF", "DLF Ltd", "Realty"),
];

/// Case-insensitive search: symbol prefix or company-name substring.
pub fn search(query: &str) -> Vec<Listing> {
    let needle = query.trim().to_uppercase();
    if needle.is_empty() {
        return Vec::new();
    }
    NSE_LISTINGS
        .iter()
        .filter(|l| l.symbol.starts_with(&needle) || l.name.to_uppercase().contains(&needle))
        .take(MAX_RESULTS)
        .copied()
        .collect()
}
