//! Sales table aggregations with map/filter/fold idioms.
//!
//! The analyzer owns an in-memory, already-parsed table of sale records; the
//! CSV loader is a thin shim over the `csv` crate and exists only to feed the
//! demo binary. Each analysis is a pure function of the table.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use itertools::Itertools;
use serde::Deserialize;

/// Errors from loading the sales table.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("failed to read sales data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse sales data: {0}")]
    Csv(#[from] csv::Error),
}

/// One sale transaction. Numeric fields missing from the input default to 0,
/// text fields to the empty string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaleRecord {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Item Type")]
    pub item_type: String,
    #[serde(rename = "Sales Channel")]
    pub sales_channel: String,
    #[serde(rename = "Order Priority")]
    pub order_priority: String,
    #[serde(rename = "Order Date")]
    pub order_date: String,
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Units Sold")]
    pub units_sold: u32,
    #[serde(rename = "Unit Price")]
    pub unit_price: f64,
    #[serde(rename = "Sales")]
    pub sales: f64,
    #[serde(rename = "Profit")]
    pub profit: f64,
    #[serde(rename = "Province")]
    pub province: String,
    #[serde(rename = "Customer Segment")]
    pub customer_segment: String,
    #[serde(rename = "Product Category")]
    pub product_category: String,
}

/// Per-segment rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentStats {
    pub sales: f64,
    pub count: usize,
    pub avg: f64,
}

pub struct SalesAnalyzer {
    records: Vec<SaleRecord>,
}

impl SalesAnalyzer {
    /// Build an analyzer over an already-parsed table.
    pub fn from_records(records: Vec<SaleRecord>) -> Self {
        Self { records }
    }

    /// Load the table from a headed CSV file.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<SaleRecord>, _>>()?;
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    /// Total sales per region, highest first.
    pub fn total_sales_by_region(&self) -> Vec<(String, f64)> {
        self.sum_by(|sale| sale.region.clone(), |sale| sale.sales)
    }

    /// The `n` product categories with the highest total sales.
    pub fn top_products_by_sales(&self, n: usize) -> Vec<(String, f64)> {
        self.sum_by(|sale| sale.product_category.clone(), |sale| sale.sales)
            .into_iter()
            .take(n)
            .collect()
    }

    /// Mean sales value across all orders; 0.0 for an empty table.
    pub fn average_order_value(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: f64 = self.records.iter().map(|sale| sale.sales).sum();
        total / self.records.len() as f64
    }

    /// Sales totals, order counts and per-order averages by customer segment.
    pub fn sales_by_customer_segment(&self) -> BTreeMap<String, SegmentStats> {
        let mut stats: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for sale in &self.records {
            let entry = stats.entry(sale.customer_segment.clone()).or_insert((0.0, 0));
            entry.0 += sale.sales;
            entry.1 += 1;
        }

        stats
            .into_iter()
            .map(|(segment, (sales, count))| {
                let avg = if count > 0 { sales / count as f64 } else { 0.0 };
                (segment, SegmentStats { sales, count, avg })
            })
            .collect()
    }

    /// The `n` provinces with the highest total profit.
    pub fn top_provinces_by_profit(&self, n: usize) -> Vec<(String, f64)> {
        self.sum_by(|sale| sale.province.clone(), |sale| sale.profit)
            .into_iter()
            .take(n)
            .collect()
    }

    /// Total sales per `YYYY-MM` month, in calendar order. Orders whose date
    /// cannot be parsed land in an `"Unknown"` bucket.
    pub fn monthly_sales_trend(&self) -> BTreeMap<String, f64> {
        let mut months: BTreeMap<String, f64> = BTreeMap::new();
        for sale in &self.records {
            *months.entry(month_key(&sale.order_date)).or_insert(0.0) += sale.sales;
        }
        months
    }

    /// Group records by `key`, sum `value` per group, return groups sorted by
    /// the summed value, highest first.
    fn sum_by<K, V>(&self, key: K, value: V) -> Vec<(String, f64)>
    where
        K: Fn(&SaleRecord) -> String,
        V: Fn(&SaleRecord) -> f64,
    {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for sale in &self.records {
            *totals.entry(key(sale)).or_insert(0.0) += value(sale);
        }

        totals
            .into_iter()
            .sorted_by(|a, b| b.1.total_cmp(&a.1))
            .collect()
    }
}

/// Extract a `YYYY-MM` key from a `M/D/YYYY` date string.
fn month_key(date: &str) -> String {
    let parts: Vec<&str> = date.split('/').collect();
    match parts.as_slice() {
        [month, _, year]
            if month.parse::<u32>().map_or(false, |m| (1..=12).contains(&m))
                && year.len() == 4
                && year.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{}-{:0>2}", year, month)
        }
        _ => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sale(region: &str, segment: &str, province: &str, category: &str, date: &str, sales: f64, profit: f64) -> SaleRecord {
        SaleRecord {
            region: region.to_string(),
            customer_segment: segment.to_string(),
            province: province.to_string(),
            product_category: category.to_string(),
            order_date: date.to_string(),
            sales,
            profit,
            ..SaleRecord::default()
        }
    }

    fn fixture() -> SalesAnalyzer {
        SalesAnalyzer::from_records(vec![
            sale("Europe", "Consumer", "Quebec", "Technology", "5/22/2017", 100.0, 40.0),
            sale("Europe", "Corporate", "Ontario", "Furniture", "5/3/2017", 200.0, 10.0),
            sale("Asia", "Consumer", "Quebec", "Technology", "6/1/2017", 50.0, 25.0),
            sale("Asia", "Consumer", "Alberta", "Technology", "bad-date", 150.0, -5.0),
        ])
    }

    #[test]
    fn test_total_sales_by_region_sorted_desc() {
        let result = fixture().total_sales_by_region();
        assert_eq!(
            result,
            vec![("Europe".to_string(), 300.0), ("Asia".to_string(), 200.0)]
        );
    }

    #[test]
    fn test_top_products_truncates_and_ranks() {
        let result = fixture().top_products_by_sales(1);
        assert_eq!(result, vec![("Technology".to_string(), 300.0)]);

        let all = fixture().top_products_by_sales(10);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1], ("Furniture".to_string(), 200.0));
    }

    #[test]
    fn test_average_order_value() {
        assert_eq!(fixture().average_order_value(), 125.0);
        assert_eq!(SalesAnalyzer::from_records(Vec::new()).average_order_value(), 0.0);
    }

    #[test]
    fn test_sales_by_customer_segment() {
        let result = fixture().sales_by_customer_segment();

        let consumer = &result["Consumer"];
        assert_eq!(consumer.count, 3);
        assert_eq!(consumer.sales, 300.0);
        assert_eq!(consumer.avg, 100.0);

        let corporate = &result["Corporate"];
        assert_eq!(corporate.count, 1);
        assert_eq!(corporate.avg, 200.0);
    }

    #[test]
    fn test_top_provinces_by_profit() {
        let result = fixture().top_provinces_by_profit(10);
        assert_eq!(result[0], ("Quebec".to_string(), 65.0));
        assert_eq!(result.last().unwrap(), &("Alberta".to_string(), -5.0));
    }

    #[test]
    fn test_monthly_sales_trend_with_unknown_bucket() {
        let result = fixture().monthly_sales_trend();
        assert_eq!(result["2017-05"], 300.0);
        assert_eq!(result["2017-06"], 50.0);
        assert_eq!(result["Unknown"], 150.0);
    }

    #[test]
    fn test_month_key_parsing() {
        assert_eq!(month_key("5/22/2017"), "2017-05");
        assert_eq!(month_key("12/1/2017"), "2017-12");
        assert_eq!(month_key("13/1/2017"), "Unknown");
        assert_eq!(month_key("2017-05-22"), "Unknown");
        assert_eq!(month_key(""), "Unknown");
    }

    #[test]
    fn test_load_csv_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Region,Country,Sales,Profit,Customer Segment").unwrap();
        writeln!(file, "Europe,France,793518.00,315574.05,Consumer").unwrap();
        writeln!(file, "Asia,Japan,100.50,20.25,Corporate").unwrap();
        file.flush().unwrap();

        let analyzer = SalesAnalyzer::load_csv(file.path()).unwrap();
        assert_eq!(analyzer.len(), 2);

        let first = &analyzer.records()[0];
        assert_eq!(first.region, "Europe");
        assert_eq!(first.sales, 793518.00);
        // Columns absent from the file take their defaults.
        assert_eq!(first.units_sold, 0);
        assert_eq!(first.province, "");
    }
}
