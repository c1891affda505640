// Which metric bases a sequence length divides into. Feedback only, playback
// never looks at this.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Base {
    pub divisor: usize,
    pub label: &'static str,
}

pub const CANDIDATE_BASES: [Base; 4] = [
    Base { divisor: 3, label: "Ternary" },
    Base { divisor: 4, label: "Binary" },
    Base { divisor: 5, label: "Quinary" },
    Base { divisor: 7, label: "Septenary" },
];

pub fn possible_bases(length: usize) -> Vec<Base> {
    if length == 0 {
        return Vec::new();
    }
    CANDIDATE_BASES
        .iter()
        .copied()
        .filter(|b| length % b.divisor == 0)
        .collect()
}

pub fn describe_bases(bases: &[Base]) -> String {
    if bases.is_empty() {
        return "Possible bases: none".to_string();
    }
    let labels: Vec<&str> = bases.iter().map(|b| b.label).collect();
    format!("Possible bases: {}", labels.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divisors(length: usize) -> Vec<usize> {
        possible_bases(length).iter().map(|b| b.divisor).collect()
    }

    #[test]
    fn twelve_is_ternary_and_binary() {
        assert_eq!(divisors(12), vec![3, 4]);
        assert_eq!(describe_bases(&possible_bases(12)), "Possible bases: Ternary, Binary");
    }

    #[test]
    fn primes_report_nothing() {
        assert!(possible_bases(11).is_empty());
        assert_eq!(describe_bases(&possible_bases(11)), "Possible bases: none");
    }

    #[test]
    fn all_four_candidates() {
        assert_eq!(divisors(420), vec![3, 4, 5, 7]);
    }

    #[test]
    fn empty_has_no_base() {
        assert!(possible_bases(0).is_empty());
    }

    #[test]
    fn repeated_calls_agree() {
        for len in 0..100 {
            assert_eq!(possible_bases(len), possible_bases(len));
        }
    }
}
