// Admin dashboard: fetch a fresh snapshot per kind, classify, return JSON.

pub mod handlers;
pub mod render;
