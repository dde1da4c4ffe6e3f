use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, SerializeAs};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Customer, vehicle and payment data for one sale.
///
/// Every field is optional on the wire so that a submission can be checked
/// and all of its missing fields reported at once.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub vehicle_make: Option<String>,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NumberOrText")]
    pub vehicle_year: Option<u16>,
    #[serde(default)]
    pub vehicle_color: Option<String>,
    #[serde(default)]
    pub chassis_no: Option<String>,
    #[serde(default)]
    pub engine_no: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NumberOrText")]
    pub invoice_amount: Option<f64>, // JMD, accepts 5000 or "5000"
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
}

/// A number sent either as a JSON number or as text. Blank text reads as
/// absent so that it is reported with the other missing fields.
pub struct NumberOrText;

impl<'de, T> DeserializeAs<'de, Option<T>> for NumberOrText
where
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    fn deserialize_as<D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Number(T),
            Text(String),
        }

        match Option::<Raw<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(n)) => Ok(Some(n)),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Raw::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid number {s:?}: {e}"))),
        }
    }
}

impl<T: Serialize> SerializeAs<Option<T>> for NumberOrText {
    fn serialize_as<S>(source: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        source.serialize(serializer)
    }
}

/// Named fields of an [`InvoiceRecord`], spelled as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CustomerName,
    CustomerEmail,
    CustomerAddress,
    VehicleMake,
    VehicleModel,
    VehicleYear,
    VehicleColor,
    ChassisNo,
    EngineNo,
    InvoiceAmount,
    InvoiceDate,
}

impl Field {
    /// Fields the document layout cannot do without.
    pub const LAYOUT: [Field; 9] = [
        Field::CustomerName,
        Field::CustomerAddress,
        Field::VehicleMake,
        Field::VehicleModel,
        Field::VehicleYear,
        Field::VehicleColor,
        Field::ChassisNo,
        Field::EngineNo,
        Field::InvoiceAmount,
    ];

    /// Fields a new invoice submission must carry.
    pub const SUBMISSION: [Field; 11] = [
        Field::CustomerName,
        Field::CustomerEmail,
        Field::CustomerAddress,
        Field::VehicleMake,
        Field::VehicleModel,
        Field::VehicleYear,
        Field::VehicleColor,
        Field::ChassisNo,
        Field::EngineNo,
        Field::InvoiceAmount,
        Field::InvoiceDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::CustomerName => "customerName",
            Field::CustomerEmail => "customerEmail",
            Field::CustomerAddress => "customerAddress",
            Field::VehicleMake => "vehicleMake",
            Field::VehicleModel => "vehicleModel",
            Field::VehicleYear => "vehicleYear",
            Field::VehicleColor => "vehicleColor",
            Field::ChassisNo => "chassisNo",
            Field::EngineNo => "engineNo",
            Field::InvoiceAmount => "invoiceAmount",
            Field::InvoiceDate => "invoiceDate",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl InvoiceRecord {
    /// Whether `field` holds a usable value; blank strings count as absent.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::CustomerName => text(&self.customer_name).is_some(),
            Field::CustomerEmail => text(&self.customer_email).is_some(),
            Field::CustomerAddress => text(&self.customer_address).is_some(),
            Field::VehicleMake => text(&self.vehicle_make).is_some(),
            Field::VehicleModel => text(&self.vehicle_model).is_some(),
            Field::VehicleYear => self.vehicle_year.is_some(),
            Field::VehicleColor => text(&self.vehicle_color).is_some(),
            Field::ChassisNo => text(&self.chassis_no).is_some(),
            Field::EngineNo => text(&self.engine_no).is_some(),
            Field::InvoiceAmount => self.invoice_amount.is_some(),
            Field::InvoiceDate => self.invoice_date.is_some(),
        }
    }

    /// Fail with every absent field out of `required`, in the given order.
    pub fn require(&self, required: &[Field]) -> Result<(), ValidationError> {
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|f| !self.has(**f))
            .map(|f| f.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }

    /// "<year> <color> <make> <model>", skipping absent parts.
    pub fn vehicle_description(&self) -> String {
        let year = self.vehicle_year.map(|y| y.to_string());
        [
            year.as_deref(),
            text(&self.vehicle_color),
            text(&self.vehicle_make),
            text(&self.vehicle_model),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    /// Human-assigned identifier; generated when absent.
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(flatten)]
    pub record: InvoiceRecord,
}

/// A stored invoice.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    #[serde(flatten)]
    pub record: InvoiceRecord,
    pub pdf_file: String,
    pub pdf_url: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceResponse {
    pub message: String,
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub pdf_url: String,
    pub email_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResendResponse {
    pub message: String,
    pub email_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn accepts_amount_and_year_as_number_or_string() {
        let a: InvoiceRecord = serde_json::from_value(json!({"invoiceAmount": 5000, "vehicleYear": 2020})).unwrap();
        let b: InvoiceRecord = serde_json::from_value(json!({"invoiceAmount": "5000.50", "vehicleYear": "2020"})).unwrap();
        assert_eq!(a.invoice_amount, Some(5000.0));
        assert_eq!(b.invoice_amount, Some(5000.5));
        assert_eq!(a.vehicle_year, Some(2020));
        assert_eq!(b.vehicle_year, Some(2020));
    }

    #[test]
    fn blank_numbers_read_as_missing() {
        let r: InvoiceRecord =
            serde_json::from_value(json!({"invoiceAmount": "", "vehicleYear": "  ", "customerName": null})).unwrap();
        assert_eq!(r.invoice_amount, None);
        assert_eq!(r.vehicle_year, None);
        assert!(!r.has(Field::InvoiceAmount));

        let bad = serde_json::from_value::<InvoiceRecord>(json!({"invoiceAmount": "five"}));
        assert!(bad.unwrap_err().to_string().contains("five"));
    }

    #[test]
    fn numbers_serialize_as_json_numbers() {
        let r = InvoiceRecord { vehicle_year: Some(2020), invoice_amount: Some(5000.5), ..Default::default() };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["vehicleYear"], json!(2020));
        assert_eq!(v["invoiceAmount"], json!(5000.5));
    }

    #[test]
    fn reports_every_missing_field_in_order() {
        let record = InvoiceRecord {
            customer_name: Some("   ".into()),
            vehicle_make: Some("Toyota".into()),
            ..Default::default()
        };
        let err = record.require(&Field::LAYOUT).unwrap_err();
        assert_eq!(
            err.missing,
            vec![
                "customerName",
                "customerAddress",
                "vehicleModel",
                "vehicleYear",
                "vehicleColor",
                "chassisNo",
                "engineNo",
                "invoiceAmount"
            ]
        );
        assert!(err.to_string().starts_with("missing required fields: customerName, customerAddress"));
    }

    #[test]
    fn describes_vehicle_in_year_color_make_model_order() {
        let record = InvoiceRecord {
            vehicle_make: Some("Toyota".into()),
            vehicle_model: Some("Corolla".into()),
            vehicle_year: Some(2020),
            vehicle_color: Some("Red".into()),
            ..Default::default()
        };
        assert_eq!(record.vehicle_description(), "2020 Red Toyota Corolla");
    }

    #[test]
    fn stored_invoice_flattens_record_fields() {
        let invoice = Invoice {
            id: Uuid::nil(),
            invoice_number: "INV-001".into(),
            record: InvoiceRecord { customer_name: Some("John Doe".into()), ..Default::default() },
            pdf_file: "invoices/u_1.pdf".into(),
            pdf_url: "http://localhost/files/invoices/u_1.pdf".into(),
            created_at: Utc::now(),
            created_by: "u".into(),
        };
        let value = serde_json::to_value(&invoice).unwrap();
        assert_eq!(value["customerName"], "John Doe");
        assert_eq!(value["invoiceNumber"], "INV-001");
    }
}
