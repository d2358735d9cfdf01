pub mod directives;
pub mod modes_xml;
pub mod report;
