fn main() {
    vp_flowviz::cli::run();
}
