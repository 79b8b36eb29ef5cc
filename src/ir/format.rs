pub mod broadlink;
