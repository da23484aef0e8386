/// Test fixtures: representative HND station pages.
///
/// The full pages live in `tests/fixtures/` so the integration tests can
/// share them. They mirror the structure of the mobile gauge page:
///
///   <span class="header">{name}<br/>{river}</span>
///   <td>Letzter Wert:</td><td>{dd.mm.yy,HH:MM}</td>
///   <td>Wasserstand [cm]:</td><td>{level}</td>
///   <td>Abfluss [m&sup3;/s]</td><td>{outflow}</td>
///   <td>Meldestufe:</td><td>{current level}</td>
///   Meldestufe N: {threshold} cm<br/>...
///   I&Uuml;G: HQ<sub>100</sub>: {level} cm
///
/// Values always follow their landmark without intervening whitespace;
/// the parser reads exactly the next text fragment.

/// München / Isar with all four warning thresholds.
#[cfg(test)]
pub(crate) fn fixture_muenchen_html() -> &'static str {
    include_str!("../../tests/fixtures/sample_muenchen.html")
}

/// Lenggries / Isar: thresholds 2 and 4 are not published, outflow uses a
/// decimal comma.
#[cfg(test)]
pub(crate) fn fixture_lenggries_html() -> &'static str {
    include_str!("../../tests/fixtures/sample_lenggries.html")
}

/// A page where every value is garbled.
#[cfg(test)]
pub(crate) fn fixture_garbled_values_html() -> &'static str {
    r#"<html><body>
<p><span class="header">Kempten<br/>Iller</span></p>
<table>
<tr><td>Letzter Wert:</td><td>--.--.--,--:--</td></tr>
<tr><td>Wasserstand [cm]:</td><td>k.A.</td></tr>
<tr><td>Abfluss [m&sup3;/s]</td><td>k.A.</td></tr>
<tr><td>Meldestufe:</td><td>-</td></tr>
</table>
<p>Meldestufe 1: ? cm<br/>Meldestufe X: 100 cm</p>
<p>I&Uuml;G: HQ<sub>100</sub>: unbekannt</p>
</body></html>"#
}

/// Page cut off in the middle of the value table.
#[cfg(test)]
pub(crate) fn fixture_truncated_html() -> &'static str {
    r#"<html><body>
<p><span class="header">Wolfratshausen<br/>Loisach</span></p>
<table>
<tr><td>Wasserstand [cm]:</td><td>87</td></tr>
<tr><td>Abfluss [m&sup3;/s]"#
}
