pub mod boll_overlay;
