#![allow(dead_code)]

pub mod kitchen_builder;
