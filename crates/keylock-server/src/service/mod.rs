mod example;

pub use example::ExampleService;
