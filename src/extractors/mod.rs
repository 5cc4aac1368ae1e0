pub mod kwik;
