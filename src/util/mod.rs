pub mod fresh;
