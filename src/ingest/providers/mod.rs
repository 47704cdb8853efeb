pub mod sam_gov;
