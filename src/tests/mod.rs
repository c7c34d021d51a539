


#[cfg(test)]
mod fanout_tests;
