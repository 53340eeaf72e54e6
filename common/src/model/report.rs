use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Number of free-text form fields carried by a report.
pub const FIELD_COUNT: usize = 14;

/// Number of cells in a persisted row: timestamp, the form fields and the image URL.
pub const COLUMN_COUNT: usize = FIELD_COUNT + 2;

/// Multipart keys read from a submission, in the order they are written to a row.
pub const FIELD_KEYS: [&str; FIELD_COUNT] = [
    "srName",
    "storeName",
    "visitType",
    "category",
    "phone",
    "leadType",
    "followUpDate",
    "products",
    "orderDetails",
    "locationRecorded",
    "latitude",
    "longitude",
    "locationLink",
    "remarks",
];

/// Header written once at the top of the local fallback file.
pub const COLUMN_HEADERS: [&str; COLUMN_COUNT] = [
    "Timestamp",
    "SR Name",
    "Store Name",
    "Visit Type",
    "Category",
    "Phone",
    "Lead Type",
    "Follow Up Date",
    "Products",
    "Order Details",
    "Loc Recorded",
    "Lat",
    "Long",
    "Loc Link",
    "Remarks",
    "Image URL",
];

/// The text part of a field-visit report.
///
/// Every field is optional: the intake pipeline records whatever the client sent and
/// never rejects a report because a field is missing. Unknown multipart keys never reach
/// this struct, they are dropped by [`SubmissionForm::from_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionForm {
    pub sr_name: Option<String>,
    pub store_name: Option<String>,
    pub visit_type: Option<String>,
    pub category: Option<String>,
    pub phone: Option<String>,
    pub lead_type: Option<String>,
    pub follow_up_date: Option<String>,
    pub products: Option<String>,
    pub order_details: Option<String>,
    pub location_recorded: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub location_link: Option<String>,
    pub remarks: Option<String>,
}

impl SubmissionForm {
    /// Builds a form by explicit key extraction from the raw multipart text parts.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let take = |key: &str| fields.get(key).cloned();
        Self {
            sr_name: take("srName"),
            store_name: take("storeName"),
            visit_type: take("visitType"),
            category: take("category"),
            phone: take("phone"),
            lead_type: take("leadType"),
            follow_up_date: take("followUpDate"),
            products: take("products"),
            order_details: take("orderDetails"),
            location_recorded: take("locationRecorded"),
            latitude: take("latitude"),
            longitude: take("longitude"),
            location_link: take("locationLink"),
            remarks: take("remarks"),
        }
    }

    /// Field values in [`FIELD_KEYS`] order.
    pub fn values(&self) -> [Option<&str>; FIELD_COUNT] {
        [
            self.sr_name.as_deref(),
            self.store_name.as_deref(),
            self.visit_type.as_deref(),
            self.category.as_deref(),
            self.phone.as_deref(),
            self.lead_type.as_deref(),
            self.follow_up_date.as_deref(),
            self.products.as_deref(),
            self.order_details.as_deref(),
            self.location_recorded.as_deref(),
            self.latitude.as_deref(),
            self.longitude.as_deref(),
            self.location_link.as_deref(),
            self.remarks.as_deref(),
        ]
    }
}

/// One persisted report: `timestamp`, the 14 form fields, then the image URL.
///
/// Rows are append-only and have no identity of their own. Serializing a row yields a
/// JSON-style sequence of [`COLUMN_COUNT`] cells where missing fields become `null`,
/// which is the shape the spreadsheet append call expects inside `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    timestamp: String,
    fields: [Option<String>; FIELD_COUNT],
    image_url: String,
}

impl ReportRow {
    pub fn new(timestamp: String, form: &SubmissionForm, image_url: String) -> Self {
        Self {
            timestamp,
            fields: form.values().map(|v| v.map(str::to_owned)),
            image_url,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// All cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        std::iter::once(Some(self.timestamp.as_str()))
            .chain(self.fields.iter().map(|f| f.as_deref()))
            .chain(std::iter::once(Some(self.image_url.as_str())))
    }

    /// Cells as plain text, with missing fields rendered empty.
    pub fn record(&self) -> Vec<&str> {
        self.cells().map(|c| c.unwrap_or("")).collect()
    }
}

impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(COLUMN_COUNT))?;
        for cell in self.cells() {
            seq.serialize_element(&cell)?;
        }
        seq.end()
    }
}
