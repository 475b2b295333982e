/// Parameterized tests with a single value
#[macro_export]
macro_rules! param_tests {
    ($fn:ident, $param:ident => [$($val:expr),+ $(,)?]) => {
        paste::paste! {
            $(
                #[test]
                #[serial_test::serial]
                fn [<$fn _ $param _ $val>]() {
                    $fn($val)
                }
            )+
        }
    };
}

/// Parameterized tests over pairs of values
#[macro_export]
macro_rules! param2_tests {
    ($fn:ident, $p1:ident, $p2:ident => [$(($v1:expr, $v2:expr)),+ $(,)?]) => {
        paste::paste! {
            $(
                #[test]
                #[serial_test::serial]
                fn [<$fn _ $p1 _ $v1 _ $p2 _ $v2>]() {
                    $fn($v1, $v2)
                }
            )+
        }
    };
}
