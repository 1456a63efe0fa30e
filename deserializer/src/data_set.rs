//! Data sets travel as an inline `xs:schema` describing the tables followed
//! by a `diffgr:diffgram` holding the rows.

use replay_model::{
    known,
    types::Family,
    value::{DataColumn, DataSetValue, DataTableValue},
    TypeRef, Value,
};
use replay_util::xml::{XmlElement, XSD_NAMESPACE};

use super::{error::Error, text};

const MSDATA_NAMESPACE: &str = "urn:schemas-microsoft-com:xml-msdata";
const DIFFGRAM_NAMESPACE: &str = "urn:schemas-microsoft-com:xml-diffgram-v1";

pub fn decode(element: &XmlElement, ty: &TypeRef) -> Result<Value, Error> {
    let schema = element
        .child("schema", Some(XSD_NAMESPACE))
        .ok_or_else(|| Error::MissingSchema(element.qualified_name()))?;

    let container = schema
        .elements()
        .find(|candidate| {
            candidate.is("element", Some(XSD_NAMESPACE))
                && candidate.attribute("IsDataSet", Some(MSDATA_NAMESPACE)) == Some("true")
        })
        .ok_or_else(|| Error::MissingSchema(element.qualified_name()))?;

    let name = container.attribute("name", None).unwrap_or("NewDataSet");
    let locale = container
        .attribute("Locale", Some(MSDATA_NAMESPACE))
        .unwrap_or_default();
    let namespace = schema.attribute("targetNamespace", None).unwrap_or_default();

    let definitions: Vec<&XmlElement> = container
        .child("complexType", Some(XSD_NAMESPACE))
        .and_then(|complex| complex.child("choice", Some(XSD_NAMESPACE)))
        .map(|choice| {
            choice
                .elements()
                .filter(|candidate| candidate.is("element", Some(XSD_NAMESPACE)))
                .collect()
        })
        .unwrap_or_default();

    let rows = element
        .child("diffgram", Some(DIFFGRAM_NAMESPACE))
        .and_then(|diffgram| diffgram.first_element());

    let mut tables = Vec::new();
    for definition in definitions {
        let table = table(definition, namespace, locale, rows)?;
        tracing::debug!(table = %table.name, rows = table.rows.len(), "decoded data table");
        tables.push(table);
    }

    if ty.family() == Some(Family::DataTable) {
        let main = container.attribute("MainDataTable", Some(MSDATA_NAMESPACE));
        let index = main
            .and_then(|main| tables.iter().position(|table| table.name == main))
            .unwrap_or(0);

        if index >= tables.len() {
            return Err(Error::MissingSchema(element.qualified_name()));
        }

        let mut table = tables.swap_remove(index);
        table.ty = ty.clone();
        return Ok(Value::DataTable(table));
    }

    Ok(Value::DataSet(DataSetValue {
        ty: ty.clone(),
        name: name.to_owned(),
        locale: locale.to_owned(),
        tables,
    }))
}

fn table(
    definition: &XmlElement,
    namespace: &str,
    locale: &str,
    rows: Option<&XmlElement>,
) -> Result<DataTableValue, Error> {
    let name = definition.attribute("name", None).unwrap_or_default();

    let mut table = DataTableValue::new(name);
    table.namespace = namespace.to_owned();
    table.locale = definition
        .attribute("Locale", Some(MSDATA_NAMESPACE))
        .unwrap_or(locale)
        .to_owned();

    table.columns = definition
        .child("complexType", Some(XSD_NAMESPACE))
        .and_then(|complex| complex.child("sequence", Some(XSD_NAMESPACE)))
        .map(|sequence| {
            sequence
                .elements()
                .filter(|column| column.is("element", Some(XSD_NAMESPACE)))
                .map(column)
                .collect()
        })
        .unwrap_or_default();

    for row in rows
        .into_iter()
        .flat_map(XmlElement::elements)
        .filter(|row| row.name == name)
    {
        let cells = table
            .columns
            .iter()
            .map(|column| match row.child(&column.name, None) {
                Some(cell) => cell_value(cell, &column.ty),
                None => Ok(Value::DbNull),
            })
            .collect::<Result<_, _>>()?;

        table.rows.push(cells);
    }

    Ok(table)
}

fn column(definition: &XmlElement) -> DataColumn {
    let name = definition.attribute("name", None).unwrap_or_default();

    let data_type = definition.attribute("DataType", Some(MSDATA_NAMESPACE));
    let ty = if data_type.map_or(false, |data_type| data_type.starts_with("System.Guid")) {
        known::guid()
    } else {
        definition
            .attribute("type", None)
            .and_then(|qualified| {
                let (_, local) = definition.resolve_qname(qualified);
                known::from_schema_name(local)
            })
            .unwrap_or_else(known::string)
    };

    DataColumn {
        name: name.to_owned(),
        ty,
    }
}

fn cell_value(cell: &XmlElement, ty: &TypeRef) -> Result<Value, Error> {
    let content = cell.text();

    match ty.primitive() {
        Some(primitive) => text::parse_primitive(primitive, &content, cell)
            .ok_or_else(|| Error::invalid_value(ty, &content)),
        None => Ok(Value::String(content)),
    }
}
