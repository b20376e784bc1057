pub mod db;
pub mod extensions;
pub mod model;
pub mod service;
pub mod web;
