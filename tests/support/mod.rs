pub mod histograms;
