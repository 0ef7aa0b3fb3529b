use scraper::{ElementRef, Html};

pub(crate) fn parse(body: &str) -> Html {
    Html::parse_document(body)
}

pub(crate) fn elements<'a>(document: &'a Html, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document
        .tree
        .nodes()
        .filter_map(ElementRef::wrap)
        .filter(move |element| element.value().name() == tag)
}

/// Value of the first element carrying `attribute`, wherever it sits in the document.
pub(crate) fn first_attribute(document: &Html, attribute: &str) -> Option<String> {
    document
        .tree
        .nodes()
        .filter_map(ElementRef::wrap)
        .find_map(|element| element.value().attr(attribute))
        .map(str::to_owned)
}

pub(crate) fn input_value(document: &Html, name: &str) -> Option<String> {
    elements(document, "input")
        .filter(|input| input.value().attr("name") == Some(name))
        .find_map(|input| input.value().attr("value"))
        .map(str::to_owned)
}
