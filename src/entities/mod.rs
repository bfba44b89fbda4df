// Part Catalog and BOM Link Store tables read by the database resolver
pub mod bom_link;
pub mod part;
