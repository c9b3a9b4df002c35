use crate::xml::Element;

/// An offer that references a product image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferImage {
    pub offer_id: String,
    pub image_url: String,
}

/// Result of walking one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferScan {
    /// Every `<offer>` seen, with or without an image.
    pub total_offers: usize,
    pub images: Vec<OfferImage>,
}

/// Collects `(id, first <picture>)` for every offer in the tree.
///
/// Offers without an `id` attribute, without a `<picture>` child, or with a
/// blank picture are counted but not returned. Read-only.
pub fn extract_offer_images(root: &Element) -> OfferScan {
    let offers = root.find_all("offer");
    let images = offers
        .iter()
        .filter_map(|offer| {
            let offer_id = offer.attr("id").map(str::trim).filter(|id| !id.is_empty())?;
            let image_url = offer.child("picture")?.text()?;
            Some(OfferImage {
                offer_id: offer_id.to_string(),
                image_url,
            })
        })
        .collect();
    OfferScan {
        total_offers: offers.len(),
        images,
    }
}
