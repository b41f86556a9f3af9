//! Element and attribute names of the record format.

/// Element names.
pub mod tags {
    /// Content subtree holding names, publication blocks, and vita.
    pub const ARTICLE: &str = "Lexikonartikel";
    pub const MAIN_NAME: &str = "Hauptbezeichnung";
    pub const SECONDARY_NAME: &str = "Nebenbezeichnung";
    /// Canonical publication-metadata block.
    pub const PUB_INFO: &str = "PubInfo";
    /// Legacy delivery block, retagged to [`PUB_INFO`] on output.
    pub const DELIVERY: &str = "Lieferung";
    pub const VITA: &str = "Vita";
    pub const BIRTH: &str = "Geburt";
    pub const DEATH: &str = "Tod";
    pub const GENDER: &str = "Geschlecht";
    /// Marker of a cross-reference stub record.
    pub const CROSS_REFERENCE: &str = "Verweis";
}

/// Attribute names.
pub mod attrs {
    /// Primary identity, the record file name.
    pub const IDENTITY: &str = "Nummer";
    pub const EXTERNAL_ID: &str = "eoebl_id";
    pub const AUTHORITY_ID: &str = "gnd";
    pub const DOI: &str = "doi";
    /// Linked biography asset.
    pub const BIOGRAPHY: &str = "pdf_file";
    pub const VERSION: &str = "version";
    /// Canonical classification attribute.
    pub const TYPE: &str = "Type";
    /// Legacy lowercase classification attribute.
    pub const LEGACY_TYPE: &str = "type";
}

/// Default classification of a secondary name.
pub const DEFAULT_SECONDARY_NAME_TYPE: &str = "Vorname";
