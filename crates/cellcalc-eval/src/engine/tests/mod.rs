mod cycle_detection;
mod graph_basic;
