#![allow(dead_code)]

use bento::data::data_model::Dataset;
use bento::descriptor::descriptor_model::Descriptor;

/// Inline `sales` data source shared by most descriptors.
pub const SALES_DATA: &str = r#"
name: sales_dashboard
data:
  sales:
    module: inline
    args:
      records:
        - {date: 1, region: east, product: widget, revenue: 10.5, units: 3}
        - {date: 2, region: west, product: gadget, revenue: 7.0, units: 1}
        - {date: 3, region: east, product: gadget, revenue: 3.25, units: 2}
      types: {date: date, revenue: float, units: int}
      keys: [region, product]
"#;

pub fn descriptor(yaml: &str) -> Descriptor {
    Descriptor::from_yaml_str(yaml).unwrap()
}

/// `pages_yaml` (starting at `pages:`) on top of the `sales` data source.
pub fn dashboard(pages_yaml: &str) -> Descriptor {
    descriptor(&format!("{}{}", SALES_DATA, pages_yaml))
}

pub fn sales_dataset() -> Dataset {
    let yaml = r#"
records:
  - {date: 1, region: east, product: widget, revenue: 10.5, units: 3}
  - {date: 2, region: west, product: gadget, revenue: 7.0, units: 1}
  - {date: 3, region: east, product: gadget, revenue: 3.25, units: 2}
types: {date: date, revenue: float, units: int}
keys: [region, product]
"#;
    serde_yaml::from_str(yaml).unwrap()
}
